pub mod source_test;
