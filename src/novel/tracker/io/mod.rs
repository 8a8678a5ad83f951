pub mod excel_read;
pub mod excel_write;
pub mod folder;
pub mod memory;
pub mod workbook;
