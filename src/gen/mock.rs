//! Global constants, used in place of the build-generated ones when the
//! `gen-mock` feature is active (eg: when building under docs.rs).

pub const COMPILATION_DATE: &str = "-";
pub const COMPILATION_TIME: &str = "-";
pub const NAME: &str = "rustboy-advance";
pub const VERSION: &str = "x.x.x";
pub const COMPILER: &str = "rustc";
pub const COMPILER_VERSION: &str = "x.x.x";
pub const FEATURES_SEQ: [&str; 1] = ["core"];
pub const PLATFORM_CPU_BITS: &str = "64";
pub const PLATFORM_CPU_BITS_INT: usize = 64;
pub const DEPENDENCIES: [(&str, &str); 0] = [];
