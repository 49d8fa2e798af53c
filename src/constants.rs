// Port configuration
pub const DEFAULT_PORT: u16 = 3001;

// Earth radius used by the distance filter (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Slider default: listings within this many km of the center are visible
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 100.0;

// Number of synthetic listings created at startup
pub const SEED_MARKER_COUNT: usize = 20;

// Random listings are scattered up to this many degrees around the center
pub const RANDOM_SPREAD_DEG: f64 = 0.1;

// Delay before the map pans to a freshly geocoded address
pub const RECENTER_DELAY_MS: u64 = 500;

// Eiffel Tower, used when the browser refuses geolocation
pub const DEFAULT_CENTER_LAT: f64 = 48.858370;
pub const DEFAULT_CENTER_LNG: f64 = 2.294481;

// Geocoding
pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const GEOCODE_TIMEOUT_SECS: u64 = 10;
pub const GEOCODED_MARKER_LABEL: &str = "A";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Geocoding service unreachable, please try again later";

// Marker icons
pub const ICON_HOUSE: &str = "https://nsm09.casimages.com/img/2022/04/01/22040102473315960417851111.png";
pub const ICON_BUILDING: &str = "https://nsm09.casimages.com/img/2022/04/01/22040104455715960417851180.png";
pub const DEFAULT_LISTING_PICTURE: &str = "http://loremflickr.com/1024/600/house";

// Size of the SSE broadcast buffer
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
