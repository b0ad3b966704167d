mod download_local;
mod helpers;
mod prepare;
mod routing;
