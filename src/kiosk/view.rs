mod organizations;
mod phone;
mod services;
mod ticket;

pub use organizations::OrganizationsScreen;
pub use phone::PhoneScreen;
pub use services::ServicesScreen;
pub use ticket::TicketScreen;
