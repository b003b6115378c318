//! Database entities

pub mod hero_image;
pub mod superhero;

pub use hero_image::Entity as HeroImage;
pub use superhero::Entity as Superhero;
