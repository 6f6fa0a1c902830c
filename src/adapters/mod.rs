pub mod booking_site;
pub mod form_sheet;
pub mod memory;
pub mod sqlite_store;

pub use booking_site::HttpBookingCalendar;
pub use form_sheet::{FormColumns, SheetFormSource};
pub use memory::InMemoryReservationStore;
pub use sqlite_store::{NewReservation, SqliteReservationStore};
