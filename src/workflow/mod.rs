pub mod compose_flow;
pub mod draw_ctx;

pub use compose_flow::ComposeFlow;
pub use draw_ctx::DrawCtx;
