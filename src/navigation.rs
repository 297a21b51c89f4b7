use crate::errors::GateError;
use crate::gate::Navigator;

/// Opens portal routes in the viewer's default browser.
#[derive(Debug, Clone)]
pub struct BrowserNavigator {
    portal_base_url: String,
}

impl BrowserNavigator {
    pub fn new(portal_base_url: impl Into<String>) -> Self {
        Self {
            portal_base_url: portal_base_url.into(),
        }
    }

    pub fn url_for(&self, route: &str) -> String {
        let base = self.portal_base_url.trim_end_matches('/');
        if route.starts_with('/') {
            format!("{}{}", base, route)
        } else {
            format!("{}/{}", base, route)
        }
    }
}

impl Navigator for BrowserNavigator {
    fn redirect(&self, route: &str) -> Result<(), GateError> {
        let url = self.url_for(route);
        open::that(&url).or(Err(GateError::NavigationFailed(url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_portal_urls() {
        let navigator = BrowserNavigator::new("https://portal.example.com/");
        assert_eq!(
            navigator.url_for("/client/login"),
            "https://portal.example.com/client/login"
        );
        assert_eq!(
            navigator.url_for("client/upgrade"),
            "https://portal.example.com/client/upgrade"
        );
    }
}
