/*
 *  lib.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
//! Noise sensor monitor: polls a sensor endpoint, keeps a rolling history
//! window and raises edge-triggered alerts when the level crosses a threshold.

pub mod aggregator;
pub mod alert;
pub mod axis;
pub mod client;
pub mod config;
pub mod devices;
pub mod history;
pub mod level;
pub mod poller;
pub mod reading;
pub mod render;
pub mod scheduler;
