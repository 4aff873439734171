use crate::sorting::common::error::Result;
use crate::sorting::frame::Frame;

pub trait FrameSource: Send {
    /// Short human-readable name for logs.
    fn name(&self) -> &str;

    fn capture(&mut self) -> Result<Frame>;
}
