pub mod kernel_driver;
