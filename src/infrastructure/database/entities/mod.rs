//! Database entities module

pub mod category;
pub mod password_otp;
pub mod product;
pub mod user;

pub use category::Entity as Category;
pub use password_otp::Entity as PasswordOtp;
pub use product::Entity as Product;
pub use user::Entity as User;
