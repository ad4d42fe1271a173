mod health_check;
mod helpers;
mod home;
mod send_news;
mod subscriptions;
