pub mod cart;
pub mod catalog;
pub mod event;
pub mod order;
pub mod ticket;

pub use cart::{Cart, CartItem};
pub use catalog::{
    CatalogQuery, Category, City, Country, Listing, SitemapEntry, SitemapKind, Sport, Team,
    Tournament, Venue,
};
pub use event::EventRecord;
pub use order::{NewOrder, Order, OrderStatus};
pub use ticket::{group_tickets, TicketGroup, TicketRecord};
