pub mod ant_farm;
