mod compile;
mod loading;
mod resolution;
