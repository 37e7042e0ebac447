pub mod color;
pub mod error;
pub mod pixel;
pub mod roi;
pub mod screen;
pub mod tabs;
pub mod template;

pub use color::Color;
pub use error::VisionError;
pub use pixel::{MatchStrategy, PixelChecker, PixelDetail, PixelMatchResult, PixelRule, PixelSignature};
pub use roi::Roi;
pub use screen::Screen;
pub use tabs::{TabBar, TabProbe};
pub use template::{
    CorrelationMethod, ImageChecker, ImageMatchDetail, ImageMatchResult, ImageRule, ImageSignature,
    Template,
};
