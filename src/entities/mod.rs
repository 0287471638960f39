pub mod cards;
pub mod draw_results;
pub mod gachas;
pub mod point_transactions;
pub mod user_cards;
pub mod users;

pub use cards as card_entity;
pub use draw_results as draw_result_entity;
pub use gachas as gacha_entity;
pub use point_transactions as point_transaction_entity;
pub use user_cards as user_card_entity;
pub use users as user_entity;
