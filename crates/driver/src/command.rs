use crossbeam::channel::Sender;
use renderer::{Asset, AssetKind};
use scene_script::{Color, Op};

/// Work for the render thread, applied in arrival order.
pub enum Command {
    Submit { id: String, ops: Vec<Op> },
    SubmitBatch(Vec<(String, Vec<Op>)>),
    Delete(String),
    Reset,
    SetClearColor(Color),
    AssetReady { id: String, asset: Asset },
    AssetDelete { kind: AssetKind, id: String },
    Resize { width: u32, height: u32 },
    RequestRedraw,
    /// Replies once every earlier command is applied and any pending redraw
    /// has been attempted.
    Flush(Sender<()>),
    Shutdown,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::SubmitBatch(_) => "submit_batch",
            Self::Delete(_) => "delete",
            Self::Reset => "reset",
            Self::SetClearColor(_) => "set_clear_color",
            Self::AssetReady { .. } => "asset_ready",
            Self::AssetDelete { .. } => "asset_delete",
            Self::Resize { .. } => "resize",
            Self::RequestRedraw => "request_redraw",
            Self::Flush(_) => "flush",
            Self::Shutdown => "shutdown",
        }
    }
}
