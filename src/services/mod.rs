pub mod annotation_service;
