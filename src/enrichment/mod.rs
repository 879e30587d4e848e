pub mod description;
pub mod nearby;
pub mod places;
pub mod traits;
pub mod types;

pub use description::FunctionDescriptionClient;
pub use nearby::{
    fetch_places, generate_location_description, merge_places, property_map_url, static_map_url,
};
pub use places::GooglePlacesClient;
pub use traits::{DescriptionGenerator, PlaceSearch};
pub use types::NearbySearchParams;
