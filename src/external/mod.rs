pub mod bar_provider;
pub mod eastmoney;
pub mod sina;
