pub mod gacha;
pub mod point;
pub mod user;

pub use gacha::gacha_config;
pub use point::point_config;
pub use user::user_config;
