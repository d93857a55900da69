pub struct Config {
    /// Columns at or below this altitude are under water.
    pub sea_level: f32,
    /// Above this temperature sample the climate reads as desert.
    pub desert_temp: f64,
    /// Below this temperature sample the climate reads as snowfields.
    pub snow_temp: f64,
}

pub const CONFIG: Config = Config {
    sea_level: 42.0,
    desert_temp: 0.45,
    snow_temp: -0.4,
};
