pub mod connection;
pub mod remote;
pub mod scripted;

pub mod prelude {
    pub use crate::connection::ToolConnection;
    pub use crate::remote::{RemotePipeline, decode_line, decode_ndjson};
    pub use crate::scripted::ScriptedPipeline;
}
