pub mod invoker;
pub mod resolver;
