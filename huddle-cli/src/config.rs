use anyhow::Result;
use huddle_core::{HuddleConfig, HuddleError, RouteStyle};

/// Global flags that take precedence over every config layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub routes: Option<RouteStyle>,
}

pub fn load(overrides: &CliOverrides) -> Result<HuddleConfig> {
    let mut config = HuddleConfig::load().map_err(HuddleError::from)?;
    apply(&mut config, overrides)?;
    Ok(config)
}

fn apply(config: &mut HuddleConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(url) = &overrides.url {
        config.gateway.base_url = url.clone();
    }
    if let Some(routes) = overrides.routes {
        config.gateway.routes = routes;
    }
    config.validate().map_err(HuddleError::from)?;
    Ok(())
}
