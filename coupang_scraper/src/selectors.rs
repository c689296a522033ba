//! Candidate selector lists for an unstable, frequently-renamed page
//! structure. Each list is tried in order; the first hit wins.

/// Login affordances on the homepage.
pub const HOME_LOGIN: &[&str] = &[
    "a[href*=\"login\"]",
    "a[href*=\"signin\"]",
    "[class*=\"login\"]",
    "[class*=\"sign-in\"]",
];

pub const EMAIL_INPUT: &[&str] = &[
    "input[name=\"email\"]",
    "input[type=\"email\"]",
    "#login-email-input",
    "input[name=\"username\"]",
    "input[placeholder*=\"email\"]",
    "input[placeholder*=\"信箱\"]",
    "input[placeholder*=\"帳號\"]",
];

pub const PASSWORD_INPUT: &[&str] = &[
    "input[name=\"password\"]",
    "input[type=\"password\"]",
    "#login-password-input",
    "input[placeholder*=\"密碼\"]",
    "input[placeholder*=\"password\"]",
];

pub const SUBMIT_BUTTON: &[&str] = &[
    "button[type=\"submit\"]",
    ".login-btn",
    ".login__button",
    "input[type=\"submit\"]",
];

/// Signs that a session is already authenticated.
pub const LOGGED_IN_MARKERS: &[&str] = &[
    "[class*=\"my-coupang\"]",
    "[class*=\"user\"]",
    "[class*=\"mypage\"]",
    "[class*=\"account\"]",
    "a[href*=\"mypage\"]",
    "a[href*=\"logout\"]",
];

/// Order container groups. The styled-components class observed on the
/// current order page comes first; generic patterns follow.
pub const ORDER_ITEM: &[&str] = &[
    "div.sc-fimazj-0",
    "[class*=\"order-item\"]",
    "[class*=\"order-list\"] > div",
    "[class*=\"orderList\"] > li",
    ".order-card",
];

pub const ORDER_ID: &[&str] = &[
    "[class*=\"order-id\"]",
    "[class*=\"orderId\"]",
    "[class*=\"order-number\"]",
];

pub const ORDER_DATE: &[&str] = &[
    "[class*=\"order-date\"]",
    "[class*=\"orderDate\"]",
    "time",
];

pub const PRODUCT_NAME: &[&str] = &[
    "[class*=\"product-name\"]",
    "[class*=\"productName\"]",
    "[class*=\"item-name\"]",
];

pub const PRODUCT_PRICE: &[&str] = &[
    "[class*=\"price\"]",
    "[class*=\"total-price\"]",
    "[class*=\"amount\"]",
];

pub const PRODUCT_IMAGE: &[&str] = &["[class*=\"product\"] img", "[class*=\"item\"] img"];

pub const PRODUCT_LINK: &[&str] = &["[class*=\"product\"] a", "[class*=\"item-name\"] a"];

pub const QUANTITY: &[&str] = &[
    "[class*=\"quantity\"]",
    "[class*=\"qty\"]",
    "[class*=\"count\"]",
];

pub const ORDER_STATUS: &[&str] = &[
    "[class*=\"status\"]",
    "[class*=\"delivery\"]",
    "[class*=\"shipping\"]",
];

pub const NEXT_PAGE: &[&str] = &[
    "[class*=\"next\"]",
    "[class*=\"pagination\"] a:last-child",
    "button[aria-label=\"next\"]",
];
