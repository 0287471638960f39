pub mod draw_engine;
pub mod gacha_service;
pub mod point_service;
pub mod user_service;

pub use gacha_service::*;
pub use point_service::*;
pub use user_service::*;
