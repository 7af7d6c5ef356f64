#![allow(dead_code, unused_imports)]

pub use forecast_dag_test_utils::builders;
pub use forecast_dag_test_utils::{init_tracing, with_timeout};
