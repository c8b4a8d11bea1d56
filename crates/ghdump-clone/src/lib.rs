pub mod destination;
pub mod git_ops;
pub mod orchestrator;
pub mod pipeline;

#[cfg(test)]
mod test_support;
