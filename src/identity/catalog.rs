/// Built-in catalog of VPN locations, in rotation order
///
/// Used when the configuration does not list its own identities.
pub const DEFAULT_IDENTITIES: &[&str] = &[
    "Afghanistan",
    "Albania",
    "Algeria",
    "Andorra",
    "Angola",
    "Argentina",
    "Armenia",
    "Adelaide",
    "Brisbane",
    "Melbourne",
    "Perth",
    "Sydney",
    "Austria",
    "Azerbaijan",
    "Bahamas",
    "Bahrain",
    "Bangladesh",
    "Belgium",
    "Belize",
    "Bermuda",
    "Bhutan",
    "Bolivia",
    "Bosnia and Herzegovina",
    "Brazil",
    "Brunei Darussalam",
    "Bulgaria",
    "Cambodia",
    "Montreal",
    "Toronto",
    "Vancouver",
    "Cayman Islands",
    "Chile",
    "Colombia",
    "Comoros",
    "Costa Rica",
    "Croatia",
    "Cyprus",
    "Czech Republic",
    "Denmark",
    "Dominican Republic",
    "Ecuador",
    "Egypt",
    "El Salvador",
    "Estonia",
    "Ethiopia",
    "Finland",
    "Paris",
    "Georgia",
    "Berlin",
    "Frankfurt",
    "Ghana",
    "Greece",
    "Greenland",
    "Guam",
    "Guatemala",
    "Honduras",
    "Hong Kong",
    "Hungary",
    "Iceland",
    "India",
    "Indonesia",
    "Iraq",
    "Ireland",
    "Isle of Man",
    "Israel",
    "Italy",
    "Jamaica",
    "Japan",
    "Jersey",
    "Jordan",
    "Kazakhstan",
    "Kenya",
    "Kuwait",
    "Lao People's Democratic Republic",
    "Latvia",
    "Lebanon",
    "Libyan Arab Jamahiriya",
    "Liechtenstein",
    "Lithuania",
    "Luxembourg",
    "Malaysia",
    "Malta",
    "Mauritania",
    "Mexico",
    "Moldova",
    "Monaco",
    "Mongolia",
    "Montenegro",
    "Morocco",
    "Mozambique",
    "Myanmar",
    "Nepal",
    "Amsterdam",
    "Auckland",
    "Nigeria",
    "North Macedonia",
    "Norway",
    "Pakistan",
    "Panama",
    "Papua New Guinea",
    "Paraguay",
    "Peru",
    "Philippines",
    "Poland",
    "Portugal",
    "Puerto Rico",
    "Qatar",
    "Romania",
    "Rwanda",
    "Senegal",
    "Serbia",
    "Singapore",
    "Slovakia",
    "Slovenia",
    "Somalia",
    "South Africa",
    "South Korea",
    "Spain",
    "Sri Lanka",
    "Sweden",
    "Switzerland",
    "Taiwan",
    "Thailand",
    "Trinidad and Tobago",
    "Tunisia",
    "Turkey",
    "Ukraine",
    "United Arab Emirates",
    "London",
    "Manchester",
    "Ashburn",
    "Atlanta",
    "Boston",
    "Buffalo",
    "Charlotte",
    "Chicago",
    "Dallas",
    "Denver",
    "Kansas City",
    "Las Vegas",
    "Los Angeles",
    "Miami",
    "New York",
    "Phoenix",
    "Salt Lake City",
    "San Francisco",
    "Seattle",
    "St. Louis",
    "Tampa",
    "Uruguay",
    "Uzbekistan",
    "Venezuela",
    "Vietnam",
];
