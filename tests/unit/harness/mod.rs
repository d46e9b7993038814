pub mod differential_test;
pub mod suite_test;
