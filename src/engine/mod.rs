mod async_engine;
#[cfg(test)]
mod tests;

pub use async_engine::AsyncEngine;
