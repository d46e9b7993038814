pub mod runner_test;
