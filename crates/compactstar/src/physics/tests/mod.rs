//! Scenario tests running the whole collision pipeline: vertex buffer in,
//! tree built, then queried the way camera and character controllers do

mod picking;
