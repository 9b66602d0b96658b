// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bitvec::prelude::*;
use chrono;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path;
use std::rc::Rc;
use vcd;

use crate::word::Word;

const DEFAULT_VCD_FILE: &str = "rvsim.vcd";
pub const DEFAULT_TOP_MODULE: &str = "testbench";
const DEFAULT_VCD_HEADER: &str = "rvsim VCD";

/// Writes one VCD timestamp per simulated cycle.
///
/// IO failures are latched: after the first error the writer logs once
/// and silently drops all further output, so a full disk never takes
/// the simulation down with it.
pub struct VcdWriter {
    writer: vcd::Writer<fs::File>,
    is_error_state: bool,
    scope_stack: Vec<String>,
    id_map: HashMap<String, vcd::IdCode>,
    last_value_map: HashMap<vcd::IdCode, BitBox<usize, Lsb0>>,
    timestamp: u64,
}

pub struct VcdTraceScope {
    writer: Rc<RefCell<VcdWriter>>,
    scope: String,
}

impl Drop for VcdTraceScope {
    fn drop(&mut self) {
        self.writer.borrow_mut().leave_scope(self.scope.as_str());
    }
}

pub struct VcdDeclScope {
    writer: Rc<RefCell<VcdWriter>>,
    scope: String,
}

impl Drop for VcdDeclScope {
    fn drop(&mut self) {
        self.writer.borrow_mut().upscope(self.scope.as_str());
    }
}

impl VcdWriter {
    pub fn new(dst: path::PathBuf) -> io::Result<Self> {
        let dst_file = fs::File::create(dst)?;
        Ok(Self {
            writer: vcd::Writer::new(dst_file),
            is_error_state: false,
            scope_stack: vec![],
            id_map: HashMap::new(),
            last_value_map: HashMap::new(),
            timestamp: 0,
        })
    }

    fn vcd_error_handler(&mut self, err: io::Error) {
        if !self.is_error_state {
            self.is_error_state = true;
            log::error!("VCD writing failed with error {:?}", err)
        }
    }

    pub fn managed_decl_scope<T>(writer: Rc<RefCell<VcdWriter>>, scope: &T) -> VcdDeclScope
    where
        T: Display + ?Sized,
    {
        writer.borrow_mut().add_module(scope);
        VcdDeclScope {
            writer: Rc::clone(&writer),
            scope: scope.to_string(),
        }
    }

    pub fn managed_trace_scope<T>(writer: Rc<RefCell<VcdWriter>>, scope: &T) -> VcdTraceScope
    where
        T: Display + ?Sized,
    {
        writer.borrow_mut().enter_scope(scope);
        VcdTraceScope {
            writer: Rc::clone(&writer),
            scope: scope.to_string(),
        }
    }

    /// Declare the traced hierarchy and record every signal's initial
    /// value at timestamp 0, before the simulator has stepped.
    pub fn write_header(writer: Rc<RefCell<Self>>, component: &dyn VcdComponent) {
        writer
            .borrow_mut()
            .writer
            .comment(DEFAULT_VCD_HEADER)
            .unwrap_or_else(|err| writer.borrow_mut().vcd_error_handler(err));
        writer
            .borrow_mut()
            .writer
            .date(chrono::Utc::now().to_string().as_str())
            .unwrap_or_else(|err| writer.borrow_mut().vcd_error_handler(err));
        component.vcd_write_scope(Rc::clone(&writer));
        writer
            .borrow_mut()
            .writer
            .enddefinitions()
            .unwrap_or_else(|err| writer.borrow_mut().vcd_error_handler(err));
        writer.borrow_mut().enter_cycle();
        component.vcd_init(Rc::clone(&writer));
        writer.borrow_mut().end_cycle();
    }

    fn enter_scope<T: Display + ?Sized>(&mut self, name: &T) {
        self.scope_stack.push(name.to_string())
    }

    fn record_change(&mut self, id_code: vcd::IdCode, bits: BitBox<usize, Lsb0>) {
        if self.is_error_state {
            return;
        }
        self._record_change(id_code, bits)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _record_change(&mut self, id_code: vcd::IdCode, bits: BitBox<usize, Lsb0>) -> io::Result<()> {
        if let Some(last_bits) = self.last_value_map.get(&id_code) {
            if *last_bits == bits {
                return Ok(());
            }
        }
        self.writer.change_vector(
            id_code,
            bits.iter()
                .rev()
                .map(|b| (*b).into())
                .collect::<Vec<_>>()
                .as_slice(),
        )?;
        self.last_value_map.insert(id_code, bits);
        Ok(())
    }

    pub fn change_word(&mut self, name: &str, value: &Word) {
        if let Some(id_code) = self.lookup_id_code(name) {
            self.record_change(id_code, value.to_bits());
        }
    }

    pub fn change_scalar(&mut self, name: &str, value: bool) {
        if let Some(id_code) = self.lookup_id_code(name) {
            let mut bits = BitVec::<usize, Lsb0>::repeat(false, 1);
            bits.set(0, value);
            self.record_change(id_code, bits.into_boxed_bitslice());
        }
    }

    fn lookup_id_code(&self, name: &str) -> Option<vcd::IdCode> {
        let scoped_name = self.scoped_name(name);
        if let Some(id_code) = self.id_map.get(scoped_name.as_str()) {
            Some(*id_code)
        } else {
            log::warn!(
                "No such scoped name {} was defined for VCD dumps.",
                scoped_name
            );
            None
        }
    }

    pub fn enter_cycle(&mut self) {
        if self.is_error_state {
            return;
        }
        let timestamp = self.timestamp;
        self.writer
            .timestamp(timestamp)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    pub fn end_cycle(&mut self) {
        if self.is_error_state {
            return;
        }
        self.writer
            .end()
            .unwrap_or_else(|err| self.vcd_error_handler(err));
        self.timestamp += 1;
    }

    pub fn flush_after_simulation(&mut self) {
        self.enter_cycle();
        self.end_cycle();
    }

    fn leave_scope<T: Display + ?Sized>(&mut self, scope: &T) {
        let popped_scope = self
            .scope_stack
            .pop()
            .expect("Attempted to leave a scope without entering one first.");
        assert_eq!(popped_scope, scope.to_string());
    }

    fn add_module<T: Display + ?Sized>(&mut self, name: &T) {
        if self.is_error_state {
            return;
        }
        self._add_module::<T>(name)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _add_module<T: Display + ?Sized>(&mut self, name: &T) -> io::Result<()> {
        self.writer.add_module(&name.to_string())?;
        self.scope_stack.push(name.to_string());
        Ok(())
    }

    fn upscope<T: Display + ?Sized>(&mut self, scope: &T) {
        if self.is_error_state {
            return;
        }
        self._upscope::<T>(scope)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _upscope<T: Display + ?Sized>(&mut self, scope: &T) -> io::Result<()> {
        self.leave_scope(scope);
        self.writer.upscope()
    }

    pub fn add_wire(&mut self, width: usize, reference: &str) {
        if self.is_error_state {
            return;
        }
        self._add_wire(width, reference)
            .unwrap_or_else(|err| self.vcd_error_handler(err));
    }

    fn _add_wire(&mut self, width: usize, reference: &str) -> io::Result<()> {
        let var_id = self
            .writer
            .add_var(vcd::VarType::Wire, width as u32, reference, None)?;
        self.add_id_map(reference, var_id);
        Ok(())
    }

    fn scoped_name(&self, name: &str) -> String {
        self.scope_stack.join(".") + "." + name
    }

    fn add_id_map(&mut self, name: &str, vcd_id: vcd::IdCode) {
        let scoped_name = self.scoped_name(name);
        if self.id_map.contains_key(scoped_name.as_str()) {
            log::warn!("Scoped name {} was redefined for VCD dumps.", scoped_name);
        }
        self.id_map.insert(scoped_name, vcd_id);
    }
}

impl Default for VcdWriter {
    fn default() -> Self {
        let mut vcd_path = path::PathBuf::from(std::env::temp_dir());
        vcd_path.push(DEFAULT_VCD_FILE);
        log::debug!("VCD file: {}", vcd_path.display());
        VcdWriter::new(vcd_path.clone()).unwrap_or_else(|err| {
            panic!("Failed to create default VCD file {:?}: {}", vcd_path, err)
        })
    }
}

/// An object implementing VcdComponent declares the variables it wants
/// traced and records their initial values. Each such object is
/// responsible for calling into its inner VcdComponent objects.
pub trait VcdComponent {
    /// Declare this component's scope and variables in the VCD header.
    fn vcd_write_scope(&self, vcd_writer: Rc<RefCell<VcdWriter>>);

    /// Record initial values at simulation time 0.
    fn vcd_init(&self, vcd_writer: Rc<RefCell<VcdWriter>>);
}
