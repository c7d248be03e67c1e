// Storage Layer Test Suite
// Organized by component: errors, models, each backend, the selector, the console




#[cfg(test)]
mod db_storage_tests;
