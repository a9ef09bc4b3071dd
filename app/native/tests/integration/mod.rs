mod albums;
mod persistence;
mod rotation;
mod scheduling;
