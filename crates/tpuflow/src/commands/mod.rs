pub mod cleanup;
pub mod create;
pub mod ls;
pub mod print_config;
pub mod reinstall;
pub mod restart;
pub mod rm;
pub mod stop;
