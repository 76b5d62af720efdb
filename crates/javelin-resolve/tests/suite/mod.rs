mod lub;
mod properties;
