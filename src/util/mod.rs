pub mod api_date;
