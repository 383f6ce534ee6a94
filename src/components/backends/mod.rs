pub mod gdal_backend;
pub mod mem_backend;
