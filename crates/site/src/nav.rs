//! Top navigation bar.

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

/// The site's navigation, in display order.
pub const NAV_ITEMS: [NavItem; 4] = [
    NavItem {
        label: "HOME",
        path: "/",
    },
    NavItem {
        label: "ABOUT US",
        path: "/about-us",
    },
    NavItem {
        label: "SERVICE",
        path: "/service",
    },
    NavItem {
        label: "CONTACT",
        path: "/contact",
    },
];

/// A navigation entry as rendered for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Navigation for a page at `current_path`. An item is active only on an
/// exact path match.
#[must_use]
pub fn nav_links(current_path: &str) -> Vec<NavLink> {
    NAV_ITEMS
        .iter()
        .map(|item| NavLink {
            label: item.label,
            path: item.path,
            active: item.path == current_path,
        })
        .collect()
}
