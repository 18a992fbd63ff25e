pub mod canvas;
pub mod clock;
pub mod dimensions;
pub mod host;
pub mod render_loop;
pub mod timer;

pub use canvas::{Canvas, DrawOp, Rgba, TextRun};
pub use clock::{ManualClock, SystemClock, TimeSource};
pub use dimensions::Dimensions;
pub use host::{FrameCallback, FrameInterceptor, FrameRequestId, Host, TimerCallback};
pub use render_loop::{FrameWork, RenderLoop};
pub use timer::{FixedHz, Schedule, TimerId, TimerQueue};
