pub use super::battery::Entity as Battery;
pub use super::capture::Entity as Capture;
pub use super::node::Entity as Node;
pub use super::paddock::Entity as Paddock;
pub use super::reading::Entity as Reading;
pub use super::user::Entity as User;
