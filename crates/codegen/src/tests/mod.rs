
mod unit_tests;
