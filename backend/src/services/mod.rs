pub mod masspay;
