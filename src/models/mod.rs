pub mod common;
pub mod gacha;
pub mod pagination;
pub mod point;
pub mod user;

pub use common::*;
pub use gacha::*;
pub use pagination::*;
pub use point::*;
pub use user::*;
