//! Database operations for the `ride_offers` table.

/// Column list shared by every query returning an [`OfferRow`].
macro_rules! offer_columns {
    () => {
        "id, zip_code, city, street, last_name, first_name, email, class_name, phone, \
         valid_from, valid_until, cost_info, additional_info, latitude, longitude, \
         edit_code, created_at, updated_at"
    };
}

mod read;
mod store;
mod types;
mod write;

pub use read::{
    get_offer, get_offer_by_edit_code, list_located_offers, list_offers_page, OFFERS_PER_PAGE,
};
pub use store::PgOfferStore;
pub use types::{OfferPage, OfferRow};
pub use write::{delete_offer, insert_offer, update_offer, EDIT_CODE_LEN};
