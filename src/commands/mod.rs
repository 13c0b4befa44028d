pub mod lambda;
pub mod serve;
