pub use super::download::Entity as Download;
pub use super::file::Entity as File;
pub use super::instrument::Entity as Instrument;
pub use super::product::Entity as Product;
pub use super::publication::Entity as Publication;
pub use super::site::Entity as Site;
pub use super::task::Entity as Task;
